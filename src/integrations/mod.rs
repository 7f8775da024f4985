pub mod airtable;
#[cfg(test)]
pub mod memory;
pub mod startgg;
