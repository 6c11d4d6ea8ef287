use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use tracing::{debug, warn};

use crate::domain::TileDomain;
use crate::filters::{FilterOptions, Filters};
use crate::spatial::SpatialFilter;
use crate::store::{FeatureSnapshot, load};
use crate::tiles::{ExtractOptions, Tile};
use crate::widgets::{WidgetRequest, WidgetResult, WidgetSource};

enum Message {
    Load {
        tiles: Vec<Tile>,
        spatial_filter: Option<SpatialFilter>,
        domain: TileDomain,
        options: ExtractOptions,
        reply: Sender<Result<usize>>,
    },
    Widget {
        filters: Filters,
        options: FilterOptions,
        request: WidgetRequest,
        reply: Sender<Result<WidgetResult>>,
    },
    Shutdown,
}

pub struct WidgetWorker {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl WidgetWorker {
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("tile-widgets-worker".to_string())
            .spawn(move || serve(receiver))
            .context("spawn widget worker")?;
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    pub fn load(
        &self,
        tiles: Vec<Tile>,
        spatial_filter: Option<SpatialFilter>,
        domain: TileDomain,
        options: ExtractOptions,
    ) -> Result<usize> {
        let (reply, response) = bounded(1);
        self.send(Message::Load {
            tiles,
            spatial_filter,
            domain,
            options,
            reply,
        })?;
        response.recv().context("widget worker dropped the load reply")?
    }

    pub fn widget(
        &self,
        filters: Filters,
        options: FilterOptions,
        request: WidgetRequest,
    ) -> Result<WidgetResult> {
        let (reply, response) = bounded(1);
        self.send(Message::Widget {
            filters,
            options,
            request,
            reply,
        })?;
        response.recv().context("widget worker dropped the widget reply")?
    }

    fn send(&self, message: Message) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow::anyhow!("widget worker has stopped"))
    }
}

impl Drop for WidgetWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("widget worker panicked");
            }
        }
    }
}

fn serve(receiver: Receiver<Message>) {
    let mut snapshot = FeatureSnapshot::default();
    for message in receiver.iter() {
        match message {
            Message::Load {
                tiles,
                spatial_filter,
                domain,
                options,
                reply,
            } => {
                let loaded = load(&tiles, spatial_filter.as_ref(), domain, &options, None);
                let result = loaded.map(|loaded| {
                    snapshot = loaded;
                    snapshot.len()
                });
                let _ = reply.send(result);
            }
            Message::Widget {
                filters,
                options,
                request,
                reply,
            } => {
                let source = WidgetSource::new(&snapshot, &filters, options);
                let _ = reply.send(source.run(&request));
            }
            Message::Shutdown => break,
        }
    }
    debug!("widget worker stopped");
}
