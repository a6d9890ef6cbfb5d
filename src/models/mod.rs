pub mod movie;
pub mod showtime;
pub mod seat;
pub mod booking;
pub mod analytics;

pub use movie::{Movie, NewMovie};
pub use showtime::{NewShowtime, Showtime};
pub use seat::{Seat, SeatState};
pub use booking::{Booking, BookingDetail};
pub use analytics::ShowtimeOccupancy;
