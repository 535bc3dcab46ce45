//! SeaORM repositories against SQLite (in-memory, or a temp file where
//! several connections are needed) with the real migrations applied.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use room_booking::application::{
    Mailer, OutgoingEmail, ReminderJob, ReminderOptions, ReminderOutcome,
};
use room_booking::domain::{
    BookingRepository, BookingStatus, CreateUserDto, DomainError, NewBooking, NewFloor, NewRoom,
    RepositoryProvider, RoomRepository, User, UserRepository, UserRole,
};
use room_booking::shared::errors::InfraError;
use room_booking::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

struct Fixture {
    repos: Arc<SeaOrmRepositoryProvider>,
    user: User,
    rooms: Vec<i32>,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    fixture_with(DatabaseConfig::new("sqlite::memory:")).await
}

async fn fixture_with(config: DatabaseConfig) -> Fixture {
    let db = init_database(&config).await.unwrap();
    run_migrations(&db).await.unwrap();
    let repos = Arc::new(SeaOrmRepositoryProvider::new(db));

    let user = repos
        .users()
        .create_user(CreateUserDto {
            username: "ann".into(),
            email: "ann@example.com".into(),
            role: UserRole::Member,
            password_hash: "x".into(),
        })
        .await
        .unwrap();

    let floor = repos
        .rooms()
        .create_floor(NewFloor {
            name: "Ground".into(),
            level: 0,
        })
        .await
        .unwrap();

    let mut rooms = Vec::new();
    for name in ["Aurora", "Borealis", "Cirrus"] {
        let room = repos
            .rooms()
            .create_room(NewRoom {
                floor_id: floor.id,
                name: name.into(),
                capacity: 6,
                description: None,
            })
            .await
            .unwrap();
        rooms.push(room.id);
    }

    Fixture { repos, user, rooms }
}

async fn book(
    f: &Fixture,
    rooms: &[i32],
    start: DateTime<Utc>,
    status: BookingStatus,
) -> i32 {
    let details = f
        .repos
        .bookings()
        .create(NewBooking {
            user_id: f.user.id.clone(),
            room_ids: rooms.to_vec(),
            start_datetime: start,
            end_datetime: start + Duration::hours(1),
            purpose: Some("Sync".into()),
        })
        .await
        .unwrap();
    if status != BookingStatus::Pending {
        f.repos
            .bookings()
            .update_status(details.booking.id, status)
            .await
            .unwrap();
    }
    details.booking.id
}

#[tokio::test]
async fn unique_username_is_conflict() {
    let f = fixture().await;
    let err = f
        .repos
        .users()
        .create_user(CreateUserDto {
            username: "ann".into(),
            email: "other@example.com".into(),
            role: UserRole::Member,
            password_hash: "x".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(f.repos.users().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn booking_loads_owner_and_rooms() {
    let f = fixture().await;
    let start = now() + Duration::days(1);
    let id = book(&f, &f.rooms[..2], start, BookingStatus::Pending).await;

    let details = f.repos.bookings().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(details.owner.username, "ann");
    assert_eq!(details.booking.status, BookingStatus::Pending);
    assert_eq!(details.booking.start_datetime, start);
    let mut names: Vec<_> = details.rooms.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Aurora", "Borealis"]);
    assert!(details.rooms.iter().all(|r| r.floor_name == "Ground"));

    let mine = f.repos.bookings().find_by_user(&f.user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(f.repos.bookings().find_by_user("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn overlap_ignores_cancelled_and_other_rooms() {
    let f = fixture().await;
    let start = now() + Duration::days(1);
    let kept = book(&f, &f.rooms[..1], start, BookingStatus::Approved).await;
    book(&f, &f.rooms[1..2], start, BookingStatus::Cancelled).await;

    let clashes = f
        .repos
        .bookings()
        .find_overlapping(
            &f.rooms,
            start + Duration::minutes(30),
            start + Duration::hours(2),
        )
        .await
        .unwrap();
    assert_eq!(clashes.iter().map(|b| b.id).collect::<Vec<_>>(), [kept]);

    // touching ranges do not overlap
    let clashes = f
        .repos
        .bookings()
        .find_overlapping(&f.rooms, start + Duration::hours(1), start + Duration::hours(2))
        .await
        .unwrap();
    assert!(clashes.is_empty());
}

#[tokio::test]
async fn window_query_selects_approved_bookings_only() {
    let f = fixture().await;
    let inside = book(&f, &f.rooms[..1], now() + Duration::minutes(24 * 60 + 30), BookingStatus::Approved).await;
    book(&f, &f.rooms[1..2], now() + Duration::minutes(24 * 60 + 30), BookingStatus::Pending).await;
    book(&f, &f.rooms[2..], now() + Duration::hours(26), BookingStatus::Approved).await;

    let found = f
        .repos
        .bookings()
        .find_approved_starting_between(now() + Duration::hours(23), now() + Duration::hours(25))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].booking.id, inside);
    assert_eq!(found[0].owner.email, "ann@example.com");
}

fn new_booking(f: &Fixture, rooms: &[i32], start: DateTime<Utc>) -> NewBooking {
    NewBooking {
        user_id: f.user.id.clone(),
        room_ids: rooms.to_vec(),
        start_datetime: start,
        end_datetime: start + Duration::hours(1),
        purpose: None,
    }
}

#[tokio::test]
async fn create_rejects_overlap_without_storing() {
    let f = fixture().await;
    let start = now() + Duration::days(1);
    let first = book(&f, &f.rooms[..1], start, BookingStatus::Approved).await;

    let err = f
        .repos
        .bookings()
        .create(new_booking(&f, &f.rooms[..2], start + Duration::minutes(30)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains(&first.to_string())));
    assert_eq!(f.repos.bookings().find_all().await.unwrap().len(), 1);

    // the free room alone is still bookable
    f.repos
        .bookings()
        .create(new_booking(&f, &f.rooms[1..2], start))
        .await
        .unwrap();
}

/// Removes the database file and its journal files on drop
struct TempDb(std::path::PathBuf);

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_creates_accept_exactly_one() {
    let temp = TempDb(std::env::temp_dir().join(format!("room-booking-{}.db", uuid::Uuid::new_v4())));
    let f = Arc::new(fixture_with(DatabaseConfig::sqlite(&temp.0.to_string_lossy())).await);
    let start = now() + Duration::days(1);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let f = f.clone();
            tokio::spawn(async move {
                f.repos
                    .bookings()
                    .create(new_booking(&f, &f.rooms[..1], start))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(DomainError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(f.repos.bookings().find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_password_replaces_hash() {
    let f = fixture().await;
    f.repos
        .users()
        .update_password(&f.user.id, "new-hash")
        .await
        .unwrap();
    let user = f.repos.users().get_user_by_id(&f.user.id).await.unwrap().unwrap();
    assert_eq!(user.password_hash, "new-hash");

    let err = f.repos.users().update_password("missing", "h").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), InfraError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[tokio::test]
async fn reminder_job_runs_against_sqlite() {
    let f = fixture().await;
    let start = now() + Duration::minutes(24 * 60 + 30);
    let id = book(&f, &f.rooms[..1], start, BookingStatus::Approved).await;
    book(&f, &f.rooms[1..2], now() + Duration::hours(26), BookingStatus::Approved).await;

    let mailer = Arc::new(RecordingMailer::default());
    let job = ReminderJob::new(f.repos.clone(), mailer.clone());

    let report = job
        .run(now(), ReminderOptions { hours: 24, dry_run: true })
        .await
        .unwrap();
    assert_eq!(report.found(), 1);
    assert_eq!(report.entries[0].outcome, ReminderOutcome::DryRun);
    assert!(mailer.sent.lock().unwrap().is_empty());

    let report = job.run(now(), ReminderOptions::default()).await.unwrap();
    assert_eq!(report.sent(), 1);
    assert_eq!(report.entries[0].booking_id, id);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
    assert!(sent[0].body.contains("Aurora (Ground)"));
}
