mod support;

use kos::database::{Database, reconcile::reconcile};
use support::TestApp;

#[tokio::test]
async fn reconcile_repairs_counter_and_calendar() {
    let app = TestApp::new();
    let owner = app.register("Budi", "owner").await;
    let sari = app.register("Sari", "society").await;
    let kos = app.create_kos(owner, "Kos Melati", 900_000, 3).await;

    let booking = app.book_ok(sari, kos, "2030-01-01", "2030-01-04").await;
    app.set_status_ok(owner, booking, "accept").await;

    let database = Database::open(app.database_path()).unwrap();
    database
        .blocking(|conn| {
            conn.execute("UPDATE kos SET available_rooms = 3", [])?;
            conn.execute("DELETE FROM booking_calendar WHERE day = '2030-01-02'", [])?;
            Ok(())
        })
        .unwrap();

    let drifts = database.blocking(|conn| reconcile(conn, false)).unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].kos_id, kos);
    assert_eq!(drifts[0].stored_available, 3);
    assert_eq!(drifts[0].expected_available, 2);
    assert_eq!(drifts[0].calendar_days_fixed, 1);
    assert_eq!(drifts[0].overbooked(), 0);

    assert_eq!(app.available_rooms(kos).await, 3, "dry run writes nothing");

    let fixed = database.blocking(|conn| reconcile(conn, true)).unwrap();
    assert_eq!(fixed, drifts);
    assert_eq!(app.available_rooms(kos).await, 2);

    assert_eq!(app.calendar(kos, "2030-01-01", "2030-01-04").await, vec![1, 1, 1, 0]);

    let clean = database.blocking(|conn| reconcile(conn, true)).unwrap();
    assert!(clean.is_empty());
}

#[tokio::test]
async fn overbooked_kos_is_reported_on_every_run() {
    let app = TestApp::new();
    let owner = app.register("Budi", "owner").await;
    let sari = app.register("Sari", "society").await;
    let dewi = app.register("Dewi", "society").await;
    let kos = app.create_kos(owner, "Kos Kecil", 500_000, 1).await;

    let first = app.book_ok(sari, kos, "2030-01-01", "2030-01-03").await;
    let second = app.book_ok(dewi, kos, "2030-02-01", "2030-02-03").await;
    app.set_status_ok(owner, first, "accept").await;

    let database = Database::open(app.database_path()).unwrap();
    database
        .blocking(|conn| {
            conn.execute("UPDATE bookings SET status = 'accept' WHERE id = ?1", [second])?;
            conn.execute(
                "INSERT INTO booking_calendar (kos_id, day, booked)
                 VALUES (?1, '2030-02-01', 1), (?1, '2030-02-02', 1)",
                [kos],
            )?;
            Ok(())
        })
        .unwrap();

    for apply in [false, true, true] {
        let drifts = database.blocking(|conn| reconcile(conn, apply)).unwrap();

        assert_eq!(drifts.len(), 1, "apply = {apply}");
        assert_eq!(drifts[0].kos_id, kos);
        assert_eq!(drifts[0].accepted, 2);
        assert_eq!(drifts[0].stored_available, 0);
        assert_eq!(drifts[0].expected_available, 0);
        assert_eq!(drifts[0].calendar_days_fixed, 0);
        assert_eq!(drifts[0].overbooked(), 1);
    }

    assert_eq!(app.available_rooms(kos).await, 0);
}
