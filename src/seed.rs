//! Demo catalog: five movies, three showtimes each, rows A-D with ten seats
//! per row for every showtime.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::info;

use crate::models::{NewMovie, NewShowtime};
use crate::store::{CatalogSeeder, StoreError};

pub const SEAT_ROWS: [&str; 4] = ["A", "B", "C", "D"];
pub const SEATS_PER_ROW: i32 = 10;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid showtime {0}")]
    InvalidTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub movies: usize,
    pub showtimes: usize,
    pub seats: usize,
}

struct DemoMovie {
    title: &'static str,
    description: &'static str,
    rating: &'static str,
    duration_minutes: i32,
    // (year, month, day, hour, minute, screen)
    showtimes: [(i32, u32, u32, u32, u32, &'static str); 3],
}

const DEMO_MOVIES: [DemoMovie; 5] = [
    DemoMovie {
        title: "Avatar",
        description: "A paraplegic Marine dispatched to the moon Pandora on a unique mission \
                      becomes torn between following his orders and protecting the world he feels is his home.",
        rating: "PG-13",
        duration_minutes: 162,
        showtimes: [
            (2025, 12, 10, 19, 30, "Screen 1"),
            (2025, 12, 10, 21, 30, "Screen 2"),
            (2025, 12, 11, 18, 0, "Screen 3"),
        ],
    },
    DemoMovie {
        title: "Twilight",
        description: "A teenage girl risks everything when she falls in love with a vampire.",
        rating: "PG-13",
        duration_minutes: 122,
        showtimes: [
            (2025, 12, 10, 20, 0, "Screen 1"),
            (2025, 12, 11, 19, 0, "Screen 2"),
            (2025, 12, 12, 21, 15, "Screen 3"),
        ],
    },
    DemoMovie {
        title: "Wicked: For Good",
        description: "Now demonized as the Wicked Witch of the West, Elphaba lives in exile in the \
                      Ozian forest, while Glinda resides at the palace in Emerald City.",
        rating: "PG",
        duration_minutes: 138,
        showtimes: [
            (2025, 12, 10, 22, 30, "Screen 1"),
            (2025, 12, 11, 17, 45, "Screen 2"),
            (2025, 12, 12, 20, 20, "Screen 3"),
        ],
    },
    DemoMovie {
        title: "Jurassic World Rebirth",
        description: "Zora Bennett leads a team of skilled operatives to the most dangerous place on \
                      Earth, an island research facility for the original Jurassic Park.",
        rating: "PG-13",
        duration_minutes: 134,
        showtimes: [
            (2025, 12, 14, 19, 0, "Screen 1"),
            (2025, 12, 14, 21, 45, "Screen 2"),
            (2025, 12, 14, 23, 15, "Screen 3"),
        ],
    },
    DemoMovie {
        title: "Black Panther",
        description: "After the death of his father, T'Challa returns home to the African nation of \
                      Wakanda to take his rightful place as king.",
        rating: "PG-13",
        duration_minutes: 135,
        showtimes: [
            (2025, 12, 13, 18, 0, "Screen 1"),
            (2025, 12, 13, 20, 15, "Screen 2"),
            (2025, 12, 13, 22, 45, "Screen 3"),
        ],
    },
];

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<NaiveDateTime, SeedError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| {
            SeedError::InvalidTime(format!("{}-{}-{} {}:{}", year, month, day, hour, minute))
        })
}

/// Inserts the demo catalog unless the store already has movies.
///
/// Showtimes are created movie by movie, so on an empty store the first
/// Avatar showtime gets id 1 and its seats A1..A10 get ids 1..10.
pub async fn seed_demo_catalog(store: &dyn CatalogSeeder) -> Result<SeedSummary, SeedError> {
    if !store.is_empty().await? {
        info!("Catalog already populated, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();
    for demo in &DEMO_MOVIES {
        let movie_id = store
            .insert_movie(NewMovie {
                title: demo.title.to_string(),
                description: demo.description.to_string(),
                rating: demo.rating.to_string(),
                duration_minutes: demo.duration_minutes,
            })
            .await?;
        summary.movies += 1;

        for &(year, month, day, hour, minute, screen) in &demo.showtimes {
            let showtime_id = store
                .insert_showtime(NewShowtime {
                    movie_id,
                    start_time: at(year, month, day, hour, minute)?,
                    screen_name: screen.to_string(),
                })
                .await?;
            store
                .insert_seat_grid(showtime_id, &SEAT_ROWS, SEATS_PER_ROW)
                .await?;
            summary.showtimes += 1;
            summary.seats += SEAT_ROWS.len() * SEATS_PER_ROW as usize;
        }
    }

    info!(
        "Seeded {} movies, {} showtimes, {} seats",
        summary.movies, summary.showtimes, summary.seats
    );
    Ok(summary)
}
