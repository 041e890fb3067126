// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fetching from an HTTP(S) artifact store.

use std::path::Path;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, trace};
use reqwest::{blocking::Client, Url};

use super::FetchError;
use crate::{constants::API_KEY_HEADER, io::write_atomically, PROGRESS_BARS};

pub(super) fn download(
    client: &Client,
    url: &Url,
    api_key: Option<&str>,
    dest: &Path,
) -> Result<u64, FetchError> {
    let mut request = client.get(url.clone());
    if let Some(key) = api_key {
        trace!("Attaching API key to request for {url}");
        request = request.header(API_KEY_HEADER, key);
    }

    let response = request.send().map_err(|e| FetchError::Request {
        url: url.to_string(),
        source: e,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let pb = ProgressBar::with_draw_target(
        response.content_length(),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    );
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}: [{wide_bar:.blue}] {bytes}/{total_bytes} ({elapsed_precise}<{eta_precise})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(
        url.path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or("download")
            .to_string(),
    );

    let mut reader = pb.wrap_read(response);
    let num_bytes = write_atomically(dest, |f| std::io::copy(&mut reader, f)).map_err(|e| {
        FetchError::Io {
            location: url.to_string(),
            dest: dest.to_path_buf(),
            source: e,
        }
    })?;
    pb.finish_and_clear();
    debug!("Downloaded {num_bytes} bytes from {url}");

    Ok(num_bytes)
}
