// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A regression-test session.
//!
//! Each regression test gets its own [`RegtestData`] with its own working
//! directory. Inputs are fetched into the working directory, truth files into
//! `<working directory>/truth`, and the test's output is compared against the
//! truth.


use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use log::{debug, info};

use crate::{
    cache::{CacheError, CacheStats, DataCache},
    compare::{compare_files, CompareOptions, ComparisonError, ComparisonResult},
    constants::{BUILD_TAG_ENV, TRUTH_SUBTREE},
    fetch::{Fetch, FetchClient},
    io::copy_atomically,
    params::RegtestParams,
    resolve::{DatasetRef, Resolver, Subtree},
};

pub struct RegtestData<F: Fetch> {
    cache: DataCache<F>,
    work_dir: PathBuf,
    results_root: String,

    /// Copy fetched files into the working directory? If not, paths inside
    /// the cache are handed out and must not be modified.
    pub docopy: bool,

    pub compare_options: CompareOptions,

    input: Option<PathBuf>,
    input_remote: Option<String>,
    output: Option<PathBuf>,
    truth: Option<PathBuf>,
    truth_remote: Option<String>,
    test_name: Option<String>,
    remote_results_path: Option<String>,
}

impl RegtestData<FetchClient> {
    /// A session fetching from the artifact store described by `params`.
    pub fn from_params<P: Into<PathBuf>>(
        params: &RegtestParams,
        work_dir: P,
    ) -> Result<RegtestData<FetchClient>, CacheError> {
        let client = FetchClient::new(params.credentials.clone(), params.timeout)?;
        RegtestData::new(params, client, work_dir)
    }
}

impl<F: Fetch> RegtestData<F> {
    /// Set up a session. The working directory is created if necessary.
    pub fn new<P: Into<PathBuf>>(
        params: &RegtestParams,
        fetcher: F,
        work_dir: P,
    ) -> Result<RegtestData<F>, CacheError> {
        let work_dir = work_dir.into();
        std::fs::create_dir_all(&work_dir).map_err(|e| CacheError::Io {
            path: work_dir.clone(),
            source: e,
        })?;
        let cache = DataCache::new(Resolver::from_params(params), fetcher, params.use_cache)?;
        debug!(
            "New regression-test session in {} (store {}, env {})",
            work_dir.display(),
            params.bigdata_root,
            params.env
        );

        Ok(RegtestData {
            cache,
            work_dir,
            results_root: params.results_root.clone(),
            docopy: params.docopy,
            compare_options: params.compare.clone(),
            input: None,
            input_remote: None,
            output: None,
            truth: None,
            truth_remote: None,
            test_name: None,
            remote_results_path: None,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn cache(&self) -> &DataCache<F> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DataCache<F> {
        &mut self.cache
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn input_remote(&self) -> Option<&str> {
        self.input_remote.as_deref()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn truth(&self) -> Option<&Path> {
        self.truth.as_deref()
    }

    pub fn truth_remote(&self) -> Option<&str> {
        self.truth_remote.as_deref()
    }

    pub fn test_name(&self) -> Option<&str> {
        self.test_name.as_deref()
    }

    /// Fetch an input file. Returns its local path, which is also recorded as
    /// this session's input.
    pub fn get_data(&mut self, path: &str) -> Result<PathBuf, CacheError> {
        let (local, remote) = self.fetch(path, Subtree::Input)?;
        info!("Input {remote} is at {}", local.display());
        self.input = Some(local.clone());
        self.input_remote = Some(remote);
        Ok(local)
    }

    /// Fetch a truth file. Returns its local path, which is also recorded as
    /// this session's truth.
    pub fn get_truth(&mut self, path: &str) -> Result<PathBuf, CacheError> {
        let (local, remote) = self.fetch(path, Subtree::Truth)?;
        info!("Truth {remote} is at {}", local.display());
        self.truth = Some(local.clone());
        self.truth_remote = Some(remote);
        Ok(local)
    }

    fn fetch(&mut self, path: &str, subtree: Subtree) -> Result<(PathBuf, String), CacheError> {
        let dataset = DatasetRef::new(path)?;
        let remote_key = self.cache.resolver().remote_key(&dataset, subtree);
        let cached = self.cache.get(&dataset, subtree)?;
        if !self.docopy {
            return Ok((cached, remote_key));
        }

        let dest_dir = match subtree {
            Subtree::Input => self.work_dir.clone(),
            Subtree::Truth => self.work_dir.join(TRUTH_SUBTREE),
        };
        let dest = dest_dir.join(dataset.file_name());
        copy_atomically(&cached, &dest).map_err(|e| CacheError::Io {
            path: dest.clone(),
            source: e,
        })?;
        Ok((dest, remote_key))
    }

    /// Record the file produced by the test. Relative paths are relative to
    /// the working directory.
    pub fn set_output<P: AsRef<Path>>(&mut self, path: P) -> &Path {
        let output = self.absolute(path.as_ref());
        self.output.insert(output)
    }

    /// Compare two files with this session's comparison options. Relative
    /// paths are relative to the working directory.
    pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        output: P,
        truth: Q,
    ) -> Result<ComparisonResult, ComparisonError> {
        compare_files(
            self.absolute(output.as_ref()),
            self.absolute(truth.as_ref()),
            &self.compare_options,
        )
    }

    /// Compare the recorded output against the recorded truth.
    pub fn compare_output_to_truth(&self) -> Result<ComparisonResult, ComparisonError> {
        let output = self.output.as_ref().ok_or(ComparisonError::NotSet("output"))?;
        let truth = self.truth.as_ref().ok_or(ComparisonError::NotSet("truth"))?;
        compare_files(output, truth, &self.compare_options)
    }

    /// Name this session's test and get where its results should be uploaded:
    /// `<results root>/<YYYY-MM-DD>_<BUILD_TAG or "local">/<test name>/`.
    pub fn remote_results_path(&mut self, test_name: &str) -> &str {
        let build_tag = std::env::var(BUILD_TAG_ENV).ok();
        let path = results_path(
            &self.results_root,
            Local::now().date_naive(),
            build_tag.as_deref(),
            test_name,
        );
        self.test_name = Some(test_name.to_string());
        self.remote_results_path.insert(path)
    }

    pub fn cache_info(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Empty the cache. Returns the number of datasets removed.
    pub fn clear_cache(&mut self) -> Result<usize, CacheError> {
        self.cache.invalidate_all()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}

pub(crate) fn results_path(
    results_root: &str,
    date: NaiveDate,
    build_tag: Option<&str>,
    test_name: &str,
) -> String {
    let build_tag = build_tag.filter(|t| !t.is_empty()).unwrap_or("local");
    format!(
        "{}/{}_{build_tag}/{test_name}/",
        results_root.trim_end_matches('/'),
        date.format("%Y-%m-%d")
    )
}

impl<F: Fetch> Display for RegtestData<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn path(p: &Option<PathBuf>) -> String {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "None".to_string())
        }
        fn string(s: &Option<String>) -> &str {
            s.as_deref().unwrap_or("None")
        }

        writeln!(f, "input:               {}", path(&self.input))?;
        writeln!(f, "output:              {}", path(&self.output))?;
        writeln!(f, "truth:               {}", path(&self.truth))?;
        writeln!(f, "input_remote:        {}", string(&self.input_remote))?;
        writeln!(f, "truth_remote:        {}", string(&self.truth_remote))?;
        writeln!(
            f,
            "remote_results_path: {}",
            string(&self.remote_results_path)
        )?;
        write!(f, "test_name:           {}", string(&self.test_name))
    }
}
