//! Archive executor with progress reporting.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::builder::archive::{ArchiveDescriptor, ArchiveRequest, Archiver};
use crate::builder::context::BuildContext;

/// Runs the archiver for every requested platform of a buildable.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
    archiver: &'a dyn Archiver,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    pub fn new(ctx: &'a BuildContext, archiver: &'a dyn Archiver) -> Self {
        BuildExecutor {
            ctx,
            archiver,
            verbose: false,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Archive `scheme` for every platform of the context, in parallel.
    ///
    /// Descriptors come back in platform order. The first failure, in
    /// platform order, is returned once every platform has finished.
    pub fn archive_all(
        &self,
        package_dir: &Path,
        package_name: &str,
        scheme: &str,
    ) -> Result<Vec<ArchiveDescriptor>> {
        let requests: Vec<ArchiveRequest> = self
            .ctx
            .platforms
            .iter()
            .map(|&platform| ArchiveRequest {
                package_dir: package_dir.to_path_buf(),
                scheme: scheme.to_string(),
                platform,
                archive_path: self.ctx.archive_path(package_name, scheme, platform),
                configuration: self.ctx.configuration.clone(),
            })
            .collect();

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.ctx.jobs {
            pool = pool.num_threads(jobs);
        }
        let pool = pool.build().context("failed to start archive workers")?;

        let results: Vec<Result<ArchiveDescriptor>> = pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    self.archiver.archive(request).with_context(|| {
                        format!("failed to archive `{}` for {}", scheme, request.platform)
                    })
                })
                .collect()
        });

        results.into_iter().collect()
    }

    /// Progress bar over `total` buildables; hidden in verbose mode or for a
    /// single unit.
    pub fn progress(&self, total: usize) -> Option<ProgressBar> {
        if self.verbose || total <= 1 {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}
