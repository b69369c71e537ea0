// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, request provenance).

pub mod auth;
pub mod request_meta;
pub mod security;

pub use auth::require_auth;
pub use request_meta::RequestMeta;
