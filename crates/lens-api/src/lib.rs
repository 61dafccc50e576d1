//! Signing proxy that brokers image uploads and deletions to Cloudinary.
//!
//! The service is a stateless translator: it validates an inbound request,
//! signs the outbound parameter set with the shared API secret, forwards the
//! call, and maps Cloudinary's answer back into a JSON envelope.

pub mod cloudinary;
pub mod config;
pub mod error;
pub mod routes;
pub mod signature;
