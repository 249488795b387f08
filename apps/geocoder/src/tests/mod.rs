mod error;
mod supervisor;
