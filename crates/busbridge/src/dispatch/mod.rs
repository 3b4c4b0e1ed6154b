// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal dispatch: observers, notifications and the registry that routes
//! incoming frames to them.

mod notification;
mod observer;
mod registry;
mod transport;

pub use notification::{arguments_from_user_info, Notification, UserInfo};
pub use observer::{ArgFilter, Delivery, DeliveryTarget, ObserverId, WeakObserver};
pub use registry::{DispatchMetrics, DispatchRegistry, MetricsSnapshot};
pub use transport::{MatchRule, MemoryTransport, Transport};
