mod envelope;
mod report;
mod request;
mod session;
mod shape;
