use anyhow::anyhow;
use uuid::Uuid;

pub const DEFAULT_PREFIX: &str = "MAT";
const RANDOM_SPACE: u128 = 1_000_000_000;

/// How a student's matricule is produced when the client does not send one.
///
/// Neither policy checks existing records: `Sequential` repeats codes after a
/// deletion (it counts records, not ids) and `Random` can collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatriculePolicy {
    /// `prefix` + zero-padded (3 digits) `len + 1`, e.g. `MAT004`.
    Sequential { prefix: String },
    /// Uniform draw in `[0, 10^9)`, zero-padded to 9 digits.
    Random,
}

impl Default for MatriculePolicy {
    fn default() -> Self {
        MatriculePolicy::Sequential {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl MatriculePolicy {
    pub fn parse(name: &str, prefix: Option<&str>) -> anyhow::Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "sequential" | "sequentiel" => Ok(MatriculePolicy::Sequential {
                prefix: prefix.unwrap_or(DEFAULT_PREFIX).to_string(),
            }),
            "random" | "aleatoire" => Ok(MatriculePolicy::Random),
            other => Err(anyhow!("unknown matricule policy: {other}")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatriculePolicy::Sequential { .. } => "sequential",
            MatriculePolicy::Random => "random",
        }
    }

    /// `existing` is the current size of the student collection.
    pub fn generate(&self, existing: usize) -> String {
        match self {
            MatriculePolicy::Sequential { prefix } => format!("{}{:03}", prefix, existing + 1),
            MatriculePolicy::Random => {
                let n = Uuid::new_v4().as_u128() % RANDOM_SPACE;
                format!("{:09}", n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_pads_to_three_digits() {
        let p = MatriculePolicy::default();
        assert_eq!(p.generate(0), "MAT001");
        assert_eq!(p.generate(41), "MAT042");
        assert_eq!(p.generate(1234), "MAT1235");
    }

    #[test]
    fn sequential_repeats_after_deletion() {
        // 3 students, MAT003 deleted -> 2 left, next is MAT003 again
        let p = MatriculePolicy::default();
        assert_eq!(p.generate(2), "MAT003");
    }

    #[test]
    fn random_is_nine_digits() {
        let p = MatriculePolicy::Random;
        for _ in 0..50 {
            let m = p.generate(0);
            assert_eq!(m.len(), 9, "{m}");
            assert!(m.chars().all(|c| c.is_ascii_digit()), "{m}");
        }
    }

    #[test]
    fn parse_accepts_known_names_and_prefix() {
        assert_eq!(
            MatriculePolicy::parse("sequential", Some("LPN")).expect("parse"),
            MatriculePolicy::Sequential { prefix: "LPN".into() }
        );
        assert_eq!(
            MatriculePolicy::parse("RANDOM", None).expect("parse"),
            MatriculePolicy::Random
        );
        assert!(MatriculePolicy::parse("uuid", None).is_err());
    }
}
