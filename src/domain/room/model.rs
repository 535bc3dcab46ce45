//! Floor and room entities

/// A floor groups rooms; `level` orders floors bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Floor {
    pub id: i32,
    pub name: String,
    pub level: i32,
}

/// Bookable room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: i32,
    pub floor_id: i32,
    /// Name of the owning floor, joined for display
    pub floor_name: String,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFloor {
    pub name: String,
    pub level: i32,
}

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub floor_id: i32,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
}
