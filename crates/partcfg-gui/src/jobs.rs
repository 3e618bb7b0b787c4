//! Network calls run on a background tokio runtime; results come back over a
//! channel that the UI drains once per frame.

use anyhow::{Context, Result};
use eframe::egui;
use partcfg_client::wire::{OrderRequest, OrderResponse};
use partcfg_client::{CadClient, CadOutcome, ClientConfig, ClientError};
use partcfg_core::PartConfig;
use std::sync::mpsc::{channel, Receiver, Sender};

pub enum JobResult {
    Cad(Result<CadOutcome, ClientError>),
    Order(Result<OrderResponse, ClientError>),
}

pub struct Jobs {
    runtime: tokio::runtime::Runtime,
    client: CadClient,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl Jobs {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("start background runtime")?;
        let client = CadClient::new(config).context("build HTTP client")?;
        let (tx, rx) = channel();
        Ok(Self {
            runtime,
            client,
            tx,
            rx,
        })
    }

    pub fn client(&self) -> &CadClient {
        &self.client
    }

    pub fn generate(&self, part: PartConfig, ctx: egui::Context) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = client.generate_cad_files(&part).await;
            let _ = tx.send(JobResult::Cad(result));
            ctx.request_repaint();
        });
    }

    pub fn order(&self, order: OrderRequest, ctx: egui::Context) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = client.submit_order(&order).await;
            let _ = tx.send(JobResult::Order(result));
            ctx.request_repaint();
        });
    }

    pub fn poll(&self) -> Vec<JobResult> {
        self.rx.try_iter().collect()
    }
}
