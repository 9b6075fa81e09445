//! # Process
//!
//! Offline maintenance for the kos database. Talks to SQLite directly through
//! the server's store functions, so every rule the API enforces applies here too.
//!
//! ## Seed
//! 1. Read a JSON fixture file of users, owners carrying their kos.
//! 2. Users already registered (by email) are reused, not duplicated.
//! 3. Kos are listed with every room free, then facilities and image paths are attached.
//!
//! ## Reconcile
//! 1. For each kos, count accepted bookings and rebuild the day calendar from their stays.
//! 2. Compare with the stored `available_rooms` and `booking_calendar`.
//! 3. Report differences; with `--apply` overwrite the stored values in one transaction.
//!
//! A kos with more accepted bookings than rooms is reported as overbooked. The counter
//! is clamped to zero, the bookings themselves are left for the owner to sort out.
use anyhow::{Result, bail};
use kos::database::{
    Database, kos as listings,
    reconcile::{self, Drift},
    users,
};
use rooms::Role;

pub mod models;
pub mod utils;

use models::Fixtures;
use utils::progress_bar;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub existing_users: usize,
    pub kos: usize,
    pub facilities: usize,
    pub images: usize,
}

pub fn seed(database: &Database, fixtures: &Fixtures) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let pb = progress_bar((fixtures.users.len() + fixtures.kos_count()) as u64)?;

    for fixture in &fixtures.users {
        pb.set_message(format!("Seeding {}", fixture.user.email));

        let found = database.blocking(|conn| users::find_by_email(conn, &fixture.user.email))?;
        let user = match found {
            Some(existing) => {
                report.existing_users += 1;
                existing
            }
            None => {
                report.users += 1;
                database.blocking(|conn| users::insert(conn, &fixture.user))?
            }
        };
        pb.inc(1);

        if !fixture.kos.is_empty() && user.role != Role::Owner {
            bail!("{} is not an owner but lists kos", user.email);
        }

        for entry in &fixture.kos {
            database.blocking(|conn| {
                let kos = listings::insert(conn, user.id, &entry.kos)?;

                for facility in &entry.facilities {
                    listings::add_facility(conn, kos.id, user.id, facility)?;
                }

                for image in &entry.images {
                    listings::add_image(conn, kos.id, user.id, image)?;
                }

                Ok(())
            })?;

            report.kos += 1;
            report.facilities += entry.facilities.len();
            report.images += entry.images.len();
            pb.inc(1);
        }
    }

    pb.finish_with_message("Done");
    Ok(report)
}

pub fn reconcile(database: &Database, apply: bool) -> Result<Vec<Drift>> {
    Ok(database.blocking(|conn| reconcile::reconcile(conn, apply))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> Fixtures {
        serde_json::from_str(
            r#"{
                "users": [
                    {
                        "name": "Budi",
                        "email": "budi@mail.test",
                        "role": "owner",
                        "kos": [
                            {
                                "name": "Kos Melati",
                                "address": "Jl. Veteran 1, Malang",
                                "price_per_month": 900000,
                                "gender": "female",
                                "total_rooms": 4,
                                "facilities": ["WiFi", "AC"],
                                "images": ["melati/1.jpg"]
                            },
                            {
                                "name": "Kos Mawar",
                                "address": "Jl. Veteran 2, Malang",
                                "price_per_month": 600000,
                                "gender": "all",
                                "total_rooms": 2
                            }
                        ]
                    },
                    { "name": "Sari", "email": "sari@mail.test", "role": "society" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::open(dir.path().join("kos.db")).unwrap();

        let report = seed(&database, &fixtures()).unwrap();
        assert_eq!(
            report,
            SeedReport {
                users: 2,
                existing_users: 0,
                kos: 2,
                facilities: 2,
                images: 1,
            }
        );

        let again = seed(&database, &fixtures()).unwrap();
        assert_eq!(again.users, 0);
        assert_eq!(again.existing_users, 2);

        assert!(reconcile(&database, false).unwrap().is_empty());
    }

    #[test]
    fn society_users_cannot_list_kos() {
        let mut fixtures = fixtures();
        let kos = fixtures.users[0].kos.pop().unwrap();
        fixtures.users[1].kos.push(kos);

        let database = Database::open_in_memory().unwrap();
        let err = seed(&database, &fixtures).unwrap_err();

        assert!(err.to_string().contains("not an owner"));
    }
}
