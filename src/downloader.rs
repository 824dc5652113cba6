use crate::{
    USER_AGENT,
    error::DownloadError,
    models::{DownloadJob, PartResult, RangeSpec},
    utils::{file_name_from_disposition, file_name_from_url},
};
use reqwest::{
    Client,
    header::{CONTENT_DISPOSITION, CONTENT_LENGTH, RANGE},
};
use sha2::{Digest, Sha256};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct Downloader {
    client: Client,
    job: DownloadJob,
}

impl Downloader {
    pub fn new(job: DownloadJob) -> Result<Self, DownloadError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, job })
    }

    /// Probes the resource, fetches all parts concurrently, merges them and
    /// verifies the digest. Returns the path of the merged file.
    pub async fn run(&self) -> Result<PathBuf, DownloadError> {
        let (file_size, remote_name) = self.probe().await?;
        let file_name = self
            .job
            .output_file_name
            .clone()
            .unwrap_or(remote_name);

        let specs = plan_parts(file_size, self.job.part_count)?;
        info!(
            size = file_size,
            parts = specs.len(),
            file = %file_name,
            "starting download"
        );

        let mut slots: Vec<PartResult> = vec![PartResult::default(); specs.len()];
        let mut tasks = JoinSet::new();
        for spec in &specs {
            let client = self.client.clone();
            let url = self.job.url.clone();
            let spec = *spec;
            tasks.spawn(async move { (spec.index, Self::fetch_part(&client, &url, spec).await) });
        }

        // Full barrier: every part has finished (or failed) before merging.
        // A failed part only logs; its slot stays empty and the digest check
        // is what catches the resulting corruption.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(part))) => slots[index] = part,
                Ok((index, Err(err))) => warn!(part = index, error = %err, "part failed"),
                Err(err) => warn!(error = %err, "part task died"),
            }
        }

        let dest = self.job.output_dir.join(&file_name);
        merge_parts(&slots, &dest, self.job.expected_sha256.as_deref())?;
        Ok(dest)
    }

    /// Learns the resource's size and name without downloading the body.
    async fn probe(&self) -> Result<(u64, String), DownloadError> {
        let resp = self.client.head(&self.job.url).send().await?;
        let status = resp.status().as_u16();
        if status >= 300 {
            return Err(DownloadError::Remote { status });
        }

        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DownloadError::Parse("response carries no content-length".into()))?
            .parse::<u64>()
            .map_err(|_| DownloadError::Parse("content-length is not a number".into()))?;

        let name = match resp.headers().get(CONTENT_DISPOSITION) {
            Some(value) => {
                let value = value.to_str().map_err(|_| {
                    DownloadError::Parse("content-disposition is not valid ascii".into())
                })?;
                file_name_from_disposition(value)?
            }
            None => file_name_from_url(&self.job.url),
        };

        Ok((size, name))
    }

    async fn fetch_part(
        client: &Client,
        url: &str,
        spec: RangeSpec,
    ) -> Result<PartResult, DownloadError> {
        debug!(part = spec.index, from = spec.from, to = spec.to, "fetching range");
        let resp = client
            .get(url)
            .header(RANGE, spec.header_value())
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status >= 300 {
            return Err(DownloadError::Remote { status });
        }
        let body = resp.bytes().await?;
        PartResult::from_body(spec, body.to_vec())
    }
}

/// Splits `[0, file_size)` into `parts` inclusive ranges.
///
/// Every part after the first starts one past its predecessor's end.
/// Non-last parts end at `from + each` inclusive, so they each cover
/// `each + 1` bytes; the last part ends at `file_size - 1` and absorbs
/// whatever is left.
pub fn plan_parts(file_size: u64, parts: usize) -> Result<Vec<RangeSpec>, DownloadError> {
    if parts == 0 || file_size == 0 {
        return Err(DownloadError::BadSplit {
            size: file_size,
            parts,
        });
    }

    let each = file_size / parts as u64;
    let mut specs: Vec<RangeSpec> = Vec::with_capacity(parts);
    for index in 0..parts {
        let from = if index == 0 { 0 } else { specs[index - 1].to + 1 };
        let to = if index < parts - 1 {
            from + each
        } else {
            file_size - 1
        };
        specs.push(RangeSpec { index, from, to });
    }
    Ok(specs)
}

/// Writes all parts to `dest` in index order while hashing the same bytes,
/// then compares the digest against `expected` when one is given.
///
/// Returns the hex-encoded SHA-256 of what was written.
pub fn merge_parts(
    parts: &[PartResult],
    dest: &Path,
    expected: Option<&str>,
) -> Result<String, DownloadError> {
    info!(path = %dest.display(), "merging parts");
    let mut merged = File::create(dest)?;
    let mut hasher = Sha256::new();
    for part in parts {
        merged.write_all(&part.data)?;
        hasher.update(&part.data);
    }

    let actual = hex::encode(hasher.finalize());
    match expected {
        Some(expected) if !actual.eq_ignore_ascii_case(expected) => Err(DownloadError::Integrity {
            expected: expected.to_string(),
            actual,
        }),
        Some(_) => {
            info!("sha-256 verified");
            Ok(actual)
        }
        None => {
            info!(sha256 = %actual, "no expected digest, verification skipped");
            Ok(actual)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn parts_of(data: &[u8], specs: &[RangeSpec]) -> Vec<PartResult> {
        specs
            .iter()
            .map(|s| PartResult {
                index: s.index,
                from: s.from,
                to: s.to,
                data: data[s.from as usize..=s.to as usize].to_vec(),
            })
            .collect()
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn plan_covers_every_byte() {
        let specs = plan_parts(1_000_000, 10).unwrap();
        assert_eq!(specs.len(), 10);
        assert_eq!(specs[0].from, 0);
        assert_eq!(specs.last().unwrap().to, 999_999);
        for pair in specs.windows(2) {
            assert!(pair[0].to < pair[1].to);
            assert_eq!(pair[1].from, pair[0].to + 1);
        }
    }

    #[test]
    fn plan_gives_non_last_parts_one_extra_byte() {
        // each = 100_000, but non-last parts span from..=from+each.
        let specs = plan_parts(1_000_000, 10).unwrap();
        for spec in &specs[..9] {
            assert_eq!(spec.byte_count(), 100_001);
        }
        assert_eq!(specs[9].byte_count(), 99_991);
        assert_eq!(specs.iter().map(RangeSpec::byte_count).sum::<u64>(), 1_000_000);
    }

    #[test]
    fn plan_single_part_spans_resource() {
        let specs = plan_parts(12_345, 1).unwrap();
        assert_eq!(specs, vec![RangeSpec { index: 0, from: 0, to: 12_344 }]);
    }

    #[test]
    fn plan_rejects_degenerate_input() {
        assert!(matches!(
            plan_parts(0, 4),
            Err(DownloadError::BadSplit { size: 0, parts: 4 })
        ));
        assert!(matches!(
            plan_parts(100, 0),
            Err(DownloadError::BadSplit { size: 100, parts: 0 })
        ));
    }

    #[test]
    fn short_body_is_rejected() {
        let spec = RangeSpec { index: 3, from: 0, to: 99 };
        let err = PartResult::from_body(spec, vec![0u8; 99]).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::ShortRead { index: 3, expected: 100, actual: 99 }
        ));
    }

    #[test]
    fn merge_reassembles_in_order() {
        let data = sample(10_000);
        let specs = plan_parts(data.len() as u64, 7).unwrap();
        let parts = parts_of(&data, &specs);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let expected = sha256_hex(&data);
        let actual = merge_parts(&parts, &dest, Some(&expected)).unwrap();

        assert_eq!(actual, expected);
        assert_eq!(std::fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn merge_detects_flipped_byte() {
        let data = sample(10_000);
        let specs = plan_parts(data.len() as u64, 4).unwrap();
        let mut parts = parts_of(&data, &specs);
        parts[2].data[17] ^= 0x01;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let err = merge_parts(&parts, &dest, Some(&sha256_hex(&data))).unwrap_err();
        assert!(matches!(err, DownloadError::Integrity { .. }));
    }

    #[test]
    fn merge_with_empty_slot_fails_verification() {
        let data = sample(5_000);
        let specs = plan_parts(data.len() as u64, 5).unwrap();
        let mut parts = parts_of(&data, &specs);
        // A failed fetch leaves the default value behind.
        parts[1] = PartResult::default();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let err = merge_parts(&parts, &dest, Some(&sha256_hex(&data))).unwrap_err();
        assert!(matches!(err, DownloadError::Integrity { .. }));
        // The incomplete file stays on disk.
        assert!(dest.exists());
    }

    #[test]
    fn merge_without_expected_digest_skips_verification() {
        let data = sample(1_000);
        let specs = plan_parts(data.len() as u64, 3).unwrap();
        let mut parts = parts_of(&data, &specs);
        parts[0] = PartResult::default();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        assert!(merge_parts(&parts, &dest, None).is_ok());
    }
}
