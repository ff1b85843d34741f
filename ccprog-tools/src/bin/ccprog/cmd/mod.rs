pub mod erase;
pub mod flash;
pub mod info;
pub mod read;
pub mod reset;
