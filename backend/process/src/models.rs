use rooms::models::{KosDraft, UserDraft};
use serde::Deserialize;

/// Seed file layout: users, each owner carrying their kos.
#[derive(Debug, Deserialize)]
pub struct Fixtures {
    pub users: Vec<FixtureUser>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureUser {
    #[serde(flatten)]
    pub user: UserDraft,
    #[serde(default)]
    pub kos: Vec<FixtureKos>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureKos {
    #[serde(flatten)]
    pub kos: KosDraft,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Fixtures {
    pub fn kos_count(&self) -> usize {
        self.users.iter().map(|user| user.kos.len()).sum()
    }
}
