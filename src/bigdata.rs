// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gating tests that need the artifact store.

use log::info;

use crate::constants::BIGDATA_ENABLE_ENV;

/// Are tests that need large datasets enabled? Only if `RTDATA_BIGDATA` is
/// "1", "true" or "yes" (case insensitive).
pub fn bigdata_enabled() -> bool {
    is_truthy(std::env::var(BIGDATA_ENABLE_ENV).ok().as_deref())
}

pub(crate) fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[doc(hidden)]
pub fn log_skip(test: &str) {
    info!("Skipping {test}: set {BIGDATA_ENABLE_ENV}=1 to run tests that need big data");
}

/// Return early from a test unless big-data tests are enabled.
///
/// ```
/// #[test]
/// fn test_photoz_against_truth() {
///     roman_photoz_regtest::skip_unless_bigdata!();
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! skip_unless_bigdata {
    () => {
        if !$crate::bigdata::bigdata_enabled() {
            $crate::bigdata::log_skip(module_path!());
            return;
        }
    };
}
