//! Bulk population in referential order.

use crate::coordinator::{DualWriter, StoreTimings};
use crate::error::{Result, SeedError};
use crate::fake::FakeData;
use crate::harness::reset_all_stores;
use crate::record::DEFAULT_MEMBER_ROLE;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One chat is created for every this many users.
pub const USERS_PER_CHAT: usize = 5;

/// Number of members generated per chat.
pub const MEMBERS_PER_CHAT: RangeInclusive<usize> = 2..=10;

/// Outcome of one `populate` run.
#[derive(Debug, Clone, Default)]
pub struct PopulateSummary {
    pub user_ids: Vec<i64>,
    pub chat_ids: Vec<i64>,
    pub member_count: u64,
    /// Wall-clock time of the whole run, reset included.
    pub elapsed: Duration,
    /// Time spent in each store during the writes.
    pub timings: StoreTimings,
}

impl PopulateSummary {
    pub fn records_written(&self) -> u64 {
        self.user_ids.len() as u64 + self.chat_ids.len() as u64 + self.member_count
    }

    /// Calculate records per second.
    pub fn records_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.records_written() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Generates users, chats and memberships through a [`DualWriter`].
pub struct Populator {
    writer: DualWriter,
    faker: Box<dyn FakeData>,
    rng: StdRng,
}

impl Populator {
    pub fn new(writer: DualWriter, faker: Box<dyn FakeData>) -> Self {
        Self {
            writer,
            faker,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed the RNG that picks owners, members and group flags.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn writer(&self) -> &DualWriter {
        &self.writer
    }

    /// Reset both stores and counters, then generate `count` users,
    /// `count / 5` chats and 2 to 10 members per chat.
    ///
    /// The first failing store call aborts the run.
    pub async fn populate(&mut self, count: usize) -> Result<PopulateSummary> {
        let start = Instant::now();

        reset_all_stores(
            self.writer.documents().as_ref(),
            self.writer.relational().as_ref(),
        )
        .await?;
        self.writer.allocator().reset_all().await?;
        self.writer.take_timings();

        info!("Populating {} user profiles", count);
        let mut user_ids = Vec::with_capacity(count);
        for _ in 0..count {
            let user_name = self.faker.user_name();
            let password = self.faker.password();
            let email = self.faker.email();
            let id = self
                .writer
                .add_user_profile(&user_name, &password, &email, None)
                .await?;
            user_ids.push(id);
        }

        let chat_count = count / USERS_PER_CHAT;
        info!("Populating {} chats", chat_count);
        let mut chat_ids = Vec::with_capacity(chat_count);
        for _ in 0..chat_count {
            let chat_name = self.faker.word();
            let is_group = self.rng.gen_bool(0.5);
            let created_by = self.pick_user(&user_ids)?;
            let id = self
                .writer
                .create_chat(&chat_name, is_group, created_by)
                .await?;
            chat_ids.push(id);
        }

        let mut member_count = 0u64;
        for &chat_id in &chat_ids {
            let members = self.rng.gen_range(MEMBERS_PER_CHAT);
            for _ in 0..members {
                let user_id = self.pick_user(&user_ids)?;
                self.writer
                    .add_chat_member(chat_id, user_id, DEFAULT_MEMBER_ROLE, None)
                    .await?;
            }
            member_count += members as u64;
            debug!("Chat {} has {} members", chat_id, members);
        }

        let summary = PopulateSummary {
            user_ids,
            chat_ids,
            member_count,
            elapsed: start.elapsed(),
            timings: self.writer.take_timings(),
        };

        info!(
            "Database populated: {} users, {} chats, {} members in {:?} ({:.2} records/sec)",
            summary.user_ids.len(),
            summary.chat_ids.len(),
            summary.member_count,
            summary.elapsed,
            summary.records_per_second()
        );

        Ok(summary)
    }

    fn pick_user(&mut self, user_ids: &[i64]) -> Result<i64> {
        user_ids
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| SeedError::Validation("no user profiles to reference".to_string()))
    }
}
