pub mod company;
pub mod job;
pub mod notification;
pub mod segment;
