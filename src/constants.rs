// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Defaults here match those used by the roman_photoz regression tests on the
artifact store; anything user-facing can be overridden by environment
variables, an arguments file or the command line.
 */

/// The environment variable naming the root of the artifact store. This is
/// either a local directory or an HTTP(S) URL.
pub const BIGDATA_ROOT_ENV: &str = "TEST_BIGDATA";

/// The environment variable naming a file containing the artifact store API
/// key.
pub const API_KEY_FILE_ENV: &str = "API_KEY_FILE";

/// The environment variable containing an artifact store API key directly.
pub const API_KEY_ENV: &str = "RTDATA_API_KEY";

/// The environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "RTDATA_CACHE_DIR";

/// The environment variable overriding the artifact store environment name.
pub const ENV_NAME_ENV: &str = "RTDATA_ENV";

/// The environment variable overriding the inputs repository.
pub const INPUTS_ROOT_ENV: &str = "RTDATA_INPUTS_ROOT";

/// The environment variable overriding the results repository.
pub const RESULTS_ROOT_ENV: &str = "RTDATA_RESULTS_ROOT";

/// The environment variable that enables tests needing large datasets.
pub const BIGDATA_ENABLE_ENV: &str = "RTDATA_BIGDATA";

/// The environment variable CI uses to tag builds.
pub const BUILD_TAG_ENV: &str = "BUILD_TAG";

/// The default artifact store environment.
pub const DEFAULT_ENV_NAME: &str = "dev";

/// The default artifact store folder for input and truth files.
pub const DEFAULT_INPUTS_ROOT: &str = "roman-pipeline";

/// The default artifact store folder for uploaded results.
pub const DEFAULT_RESULTS_ROOT: &str = "roman-pipeline-results/regression-tests/runs/";

/// The default location of the artifact store API key on CI machines. Only
/// used if the file exists.
pub const DEFAULT_API_KEY_FILE: &str = "/eng/ssb2/keys/svc_rodata.key";

/// The header carrying the artifact store API key.
pub const API_KEY_HEADER: &str = "X-JFrog-Art-Api";

/// The cache directory, relative to the user's home directory.
pub const DEFAULT_CACHE_SUBDIR: &str = ".cache/roman_photoz/regtest";

/// The name of the cache index file inside the cache directory.
pub const CACHE_INDEX_FILENAME: &str = "cache_index.json";

/// The name of the scratch directory used when caching is disabled.
pub const UNCACHED_SUBDIR: &str = "uncached";

/// The number of hex characters of the SHA-256 remote-key digest used to name
/// cache subdirectories.
pub const CACHE_HASH_LEN: usize = 8;

/// The default HTTP request timeout [seconds].
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The subtree of a repository environment holding test inputs.
pub const INPUT_SUBTREE: &str = "test_data";

/// The subtree of a repository environment holding truth files.
pub const TRUTH_SUBTREE: &str = "truth";

/// The default absolute tolerance used when comparing floats.
pub const DEFAULT_ATOL: f64 = 1e-7;

/// The default relative tolerance used when comparing floats.
pub const DEFAULT_RTOL: f64 = 1e-5;

/// The default maximum number of differences reported in a comparison.
pub const DEFAULT_MAX_REPORTED_DIFFS: usize = 50;

/// FITS keywords that are expected to differ run-to-run and are therefore not
/// compared by default. A trailing `*` matches any suffix.
pub const DEFAULT_IGNORE_KEYWORDS: &[&str] = &[
    "DATE",
    "DATE-*",
    "CAL_VER",
    "CAL_VCS",
    "CRDS_VER",
    "CRDS_CTX",
    "CHECKSUM",
    "DATASUM",
    "FILENAME",
];
