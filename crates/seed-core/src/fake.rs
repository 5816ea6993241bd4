//! Fake data source for user profiles and chats.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Produces random natural values on demand.
pub trait FakeData: Send {
    fn user_name(&mut self) -> String;
    fn password(&mut self) -> String;
    fn email(&mut self) -> String;
    /// A single word, used for chat names.
    fn word(&mut self) -> String;
}

const FIRST_NAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "mallory", "nina", "oscar", "peggy", "quentin", "rupert", "sybil", "trent", "ursula",
    "victor", "walter", "xena", "yusuf", "zoe",
];

const LAST_NAMES: &[&str] = &[
    "smith", "johnson", "williams", "brown", "jones", "garcia", "miller", "davis", "lopez",
    "wilson", "anderson", "thomas", "taylor", "moore", "martin", "lee", "walker", "young",
];

const DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "mail.test",
    "inbox.test",
];

const WORDS: &[&str] = &[
    "alpha", "anchor", "breeze", "canyon", "cedar", "comet", "delta", "ember", "falcon", "garden",
    "harbor", "island", "jasper", "kernel", "lantern", "meadow", "nebula", "orbit", "pepper",
    "quartz", "river", "summit", "thunder", "umbra", "violet", "willow", "zephyr",
];

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";
const PASSWORD_LENGTH: usize = 12;

/// Word-list backed generator with a seedable RNG.
///
/// Names and emails are drawn from small pools, so collisions are frequent
/// at realistic record counts; that is what exercises the uniqueness guard.
pub struct WordListFaker {
    rng: StdRng,
}

impl WordListFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or("x")
    }
}

impl FakeData for WordListFaker {
    fn user_name(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        match self.rng.gen_range(0..3) {
            0 => format!("{first}{}", self.rng.gen_range(1..100)),
            1 => format!("{first}.{}", self.pick(LAST_NAMES)),
            _ => format!("{first}_{}", self.pick(LAST_NAMES)),
        }
    }

    fn password(&mut self) -> String {
        (0..PASSWORD_LENGTH)
            .map(|_| {
                let idx = self.rng.gen_range(0..PASSWORD_CHARSET.len());
                PASSWORD_CHARSET[idx] as char
            })
            .collect()
    }

    fn email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let domain = self.pick(DOMAINS);
        format!("{first}.{last}@{domain}")
    }

    fn word(&mut self) -> String {
        self.pick(WORDS).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let mut a = WordListFaker::new(42);
        let mut b = WordListFaker::new(42);
        for _ in 0..20 {
            assert_eq!(a.user_name(), b.user_name());
            assert_eq!(a.email(), b.email());
        }
    }

    #[test]
    fn test_emails_have_one_separator() {
        let mut faker = WordListFaker::new(7);
        for _ in 0..50 {
            let email = faker.email();
            assert_eq!(email.matches('@').count(), 1, "{email}");
        }
    }

    #[test]
    fn test_password_length() {
        let mut faker = WordListFaker::new(7);
        assert_eq!(faker.password().len(), PASSWORD_LENGTH);
    }
}
