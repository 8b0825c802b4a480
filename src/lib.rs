//! TutorLink API - Backend for a tutoring marketplace
//!
//! This crate provides the REST API for TutorLink, enabling:
//! - User registration with OTP-based email verification
//! - Role-based profiles (student, tutor, parent)
//! - Multi-step tutor onboarding with certificate uploads
//! - Public search over approved tutors and a feedback/rating system

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod entities;
pub mod error;
pub mod onboarding;
pub mod otp;
pub mod response;
pub mod routes;
pub mod state;
pub mod storage;
