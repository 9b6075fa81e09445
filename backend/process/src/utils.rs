use std::{fs, path::Path};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use kos::database::reconcile::Drift;

use crate::models::Fixtures;

pub fn load_fixtures(path: &Path) -> Result<Fixtures> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;

    serde_json::from_str(&json).with_context(|| format!("Malformed fixtures in {}", path.display()))
}

pub fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    Ok(pb)
}

pub fn describe(drift: &Drift) -> String {
    let mut line = format!(
        "#{} {}: available {} -> {} ({} accepted of {} rooms)",
        drift.kos_id,
        drift.name,
        drift.stored_available,
        drift.expected_available,
        drift.accepted,
        drift.total_rooms,
    );

    if drift.calendar_days_fixed > 0 {
        line.push_str(&format!(", {} calendar day(s) off", drift.calendar_days_fixed));
    }

    if drift.overbooked() > 0 {
        line.push_str(&format!(", OVERBOOKED by {}", drift.overbooked()));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_drift() {
        let drift = Drift {
            kos_id: 7,
            name: "Kos Melati".to_string(),
            total_rooms: 2,
            accepted: 3,
            stored_available: 1,
            expected_available: 0,
            calendar_days_fixed: 4,
        };

        assert_eq!(
            describe(&drift),
            "#7 Kos Melati: available 1 -> 0 (3 accepted of 2 rooms), 4 calendar day(s) off, OVERBOOKED by 1"
        );
    }
}
