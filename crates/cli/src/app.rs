use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;

use agon::prelude::*;
use agon_downloader::{DownloadRequest, download};

use crate::account::load_credentials;
use crate::args::Cli;
use crate::logger::{CliLogger, LogLevel, init_tracing};
use crate::progress::DownloadProgressRenderer;
use crate::utils::output_file_name;

pub struct App {
    cli: Cli,
    logger: Arc<CliLogger>,
}

impl App {
    pub fn new() -> Self {
        let cli = Cli::parse();
        let logger = Arc::new(CliLogger::new(&cli.log_level));
        init_tracing(Arc::clone(&logger));
        Self { cli, logger }
    }

    pub async fn run(&self) {
        if let Err(err) = self.execute().await {
            self.logger.failed(format!("{err}"));
            std::process::exit(1);
        }
    }

    async fn execute(&self) -> Result<()> {
        let logger = &self.logger;

        let credentials = load_credentials(&self.cli.account, self.cli.interactive)?;
        let agon = AgonBuilder::new().build()?;

        logger
            .while_loading("logging in", agon.login_if_needed(&credentials))
            .await?;
        logger.success("session ready");

        for episode_id in self.cli.episodes.iter() {
            let info = logger
                .while_loading(
                    format!("fetching info for episode {episode_id}"),
                    agon.get_episode_info(&episode_id),
                )
                .await?;
            logger.success(format!("title: {}", info.title.yellow()));

            let resolved = logger
                .while_loading(
                    format!("resolving media for episode {episode_id}"),
                    agon.resolve_media(&info, &self.cli.size),
                )
                .await?;

            let output = self.cli.dir.join(output_file_name(&info));
            let output_str = output.to_string_lossy().into_owned();
            logger.success(format!("downloading to {}", output_str.yellow()));

            self.download_with_progress(&agon, &resolved, output).await?;
            logger.success(format!("done {}", output_str.yellow()));
        }

        logger.success("all episodes downloaded");
        Ok(())
    }

    async fn download_with_progress(
        &self,
        agon: &AgonClient,
        resolved: &ResolvedMedia,
        output: std::path::PathBuf,
    ) -> Result<()> {
        let mut renderer = DownloadProgressRenderer::new(self.logger.level >= LogLevel::Info);
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tick = tokio::time::interval(Duration::from_millis(80));

        let request =
            DownloadRequest::new(resolved.media_url.clone(), resolved.referer.clone(), output);
        let mut download_fut = std::pin::pin!(download(agon.session(), request, move |event| {
            let _ = events_tx.send(event);
        }));

        let download_result = loop {
            tokio::select! {
                result = &mut download_fut => break result,
                maybe_event = events_rx.recv() => {
                    if let Some(event) = maybe_event {
                        renderer.handle(event);
                    }
                }
                _ = tick.tick() => {
                    renderer.tick();
                }
            }
        };

        while let Ok(event) = events_rx.try_recv() {
            renderer.handle(event);
        }

        download_result.map_err(|err| AgonError::Message(format!("download failed: {err}")))?;
        Ok(())
    }
}
