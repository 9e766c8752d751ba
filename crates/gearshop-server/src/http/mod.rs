// SPDX-License-Identifier: Apache-2.0

pub(crate) mod handlers;
pub(crate) mod orders;
pub(crate) mod rates;
pub(crate) mod ratings;
