// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared timeout constants.
//!
//! All store and reconcile operations are synchronous; callers impose
//! deadlines externally using these defaults.

use std::time::Duration;

/// Default deadline for outbound HTTP-style sends (forwarder).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for a single database write.
pub const DB_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for draining subscribers at shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
