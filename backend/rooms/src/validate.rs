use crate::{
    error::RoomsError,
    models::{KosDraft, ReviewDraft, UserDraft},
};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MAX_FILE_LEN: usize = 512;
pub const MAX_ROOMS: u32 = 10_000;

pub fn required(field: &'static str, value: &str, max_len: usize) -> Result<String, RoomsError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(RoomsError::invalid(field, "must not be empty"));
    }

    optional(field, value, max_len)
}

pub fn optional(field: &'static str, value: &str, max_len: usize) -> Result<String, RoomsError> {
    let value = value.trim();

    if value.chars().count() > max_len {
        return Err(RoomsError::invalid(
            field,
            format!("longer than {max_len} characters"),
        ));
    }

    Ok(value.to_string())
}

pub fn email(value: &str) -> Result<String, RoomsError> {
    let value = required("email", value, MAX_NAME_LEN)?.to_lowercase();

    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace) =>
        {
            Ok(value)
        }
        _ => Err(RoomsError::invalid("email", format!("'{value}' is not an address"))),
    }
}

pub fn rating(value: u8) -> Result<u8, RoomsError> {
    if !(1..=5).contains(&value) {
        return Err(RoomsError::invalid("rating", "must be between 1 and 5"));
    }

    Ok(value)
}

impl KosDraft {
    /// Trimmed copy with every field checked.
    pub fn validated(&self) -> Result<KosDraft, RoomsError> {
        if self.price_per_month <= 0 {
            return Err(RoomsError::invalid("price_per_month", "must be positive"));
        }

        if self.total_rooms == 0 || self.total_rooms > MAX_ROOMS {
            return Err(RoomsError::invalid(
                "total_rooms",
                format!("must be between 1 and {MAX_ROOMS}"),
            ));
        }

        Ok(KosDraft {
            name: required("name", &self.name, MAX_NAME_LEN)?,
            address: required("address", &self.address, MAX_ADDRESS_LEN)?,
            description: optional("description", &self.description, MAX_TEXT_LEN)?,
            price_per_month: self.price_per_month,
            gender: self.gender,
            total_rooms: self.total_rooms,
        })
    }
}

impl UserDraft {
    pub fn validated(&self) -> Result<UserDraft, RoomsError> {
        Ok(UserDraft {
            name: required("name", &self.name, MAX_NAME_LEN)?,
            email: email(&self.email)?,
            phone: optional("phone", &self.phone, 32)?,
            role: self.role,
        })
    }
}

impl ReviewDraft {
    pub fn validated(&self) -> Result<ReviewDraft, RoomsError> {
        Ok(ReviewDraft {
            rating: rating(self.rating)?,
            comment: optional("comment", &self.comment, MAX_TEXT_LEN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Role};

    fn draft() -> KosDraft {
        KosDraft {
            name: "  Kos Melati ".to_string(),
            address: "Jl. Kenanga 12, Malang".to_string(),
            description: String::new(),
            price_per_month: 850_000,
            gender: Gender::Female,
            total_rooms: 10,
        }
    }

    #[test]
    fn trims_kos_fields() {
        let kos = draft().validated().unwrap();
        assert_eq!(kos.name, "Kos Melati");
    }

    #[test]
    fn rejects_bad_kos_numbers() {
        let mut kos = draft();
        kos.price_per_month = 0;
        assert!(kos.validated().is_err());

        let mut kos = draft();
        kos.total_rooms = 0;
        assert!(kos.validated().is_err());

        let mut kos = draft();
        kos.name = "   ".to_string();
        assert_eq!(
            kos.validated().unwrap_err(),
            RoomsError::invalid("name", "must not be empty")
        );
    }

    #[test]
    fn email_shapes() {
        assert_eq!(email(" Sari@Mail.com ").unwrap(), "sari@mail.com");
        assert!(email("sari@mail").is_err());
        assert!(email("@mail.com").is_err());
        assert!(email("sa ri@mail.com").is_err());
    }

    #[test]
    fn user_draft() {
        let user = UserDraft {
            name: "Sari".to_string(),
            email: "sari@mail.com".to_string(),
            phone: " 0812 ".to_string(),
            role: Role::Society,
        };

        assert_eq!(user.validated().unwrap().phone, "0812");
    }

    #[test]
    fn rating_bounds() {
        assert!(rating(0).is_err());
        assert!(rating(6).is_err());
        assert_eq!(rating(5), Ok(5));

        let review = ReviewDraft {
            rating: 4,
            comment: "x".repeat(MAX_TEXT_LEN + 1),
        };
        assert!(review.validated().is_err());
    }
}
