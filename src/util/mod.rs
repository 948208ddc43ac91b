pub mod hexdump;
pub mod parse;
