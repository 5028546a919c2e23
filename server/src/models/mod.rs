pub mod booking;
pub mod event;
pub mod ticket;
pub mod user;

pub use booking::{Booking, BookingSummary, Reservation, STATUS_CONFIRMED};
pub use event::{Event, NewEvent, DEFAULT_IMAGE_URL};
pub use ticket::{NewTicket, Ticket};
pub use user::{NewUser, User};
