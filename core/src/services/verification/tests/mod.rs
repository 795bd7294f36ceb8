//! Tests for the verification code service
