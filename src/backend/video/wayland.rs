//! wlr-gamma-control-unstable-v1 display.
//!
//! The protocol cannot read back the active ramp, so `get_gamma` reports the
//! identity ramp. The compositor restores its own ramp once the gamma control
//! is destroyed, which happens at the latest when this process disconnects.

use anyhow::{Context, Result, anyhow, bail};
use memmap2::MmapMut;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use wayland_client::{
    Connection, Dispatch, EventQueue, Proxy, QueueHandle, delegate_noop,
    protocol::{wl_output, wl_registry},
};
use wayland_protocols_wlr::gamma_control::v1::client::{
    zwlr_gamma_control_manager_v1, zwlr_gamma_control_v1,
};

use super::VideoBackend;
use crate::backend::gamma::ABSOLUTE;
use crate::gamma::{self, GammaRamp};

#[derive(Clone, Copy)]
struct OutputData {
    id: u32,
}

#[derive(Clone, Copy)]
struct GammaData {
    id: u32,
}

struct OutputState {
    name: Option<String>,
    wl_output: wl_output::WlOutput,
    gamma: Option<zwlr_gamma_control_v1::ZwlrGammaControlV1>,
    ramp_size: u32,
    table: Option<(File, MmapMut)>,
}

struct WaylandState {
    outputs: BTreeMap<u32, OutputState>,
    gamma_mgr: Option<zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1>,
    gamma_mgr_name: Option<u32>,
}

impl WaylandState {
    fn new() -> Self {
        Self {
            outputs: BTreeMap::new(),
            gamma_mgr: None,
            gamma_mgr_name: None,
        }
    }

    fn ensure_gamma_for(&mut self, qh: &QueueHandle<Self>, id: u32) {
        let Some(mgr) = self.gamma_mgr.clone() else {
            return;
        };
        let Some(output) = self.outputs.get_mut(&id) else {
            return;
        };
        if output.gamma.is_none() {
            output.gamma = Some(mgr.get_gamma_control(&output.wl_output, qh, GammaData { id }));
        }
    }

    fn ensure_gamma_all(&mut self, qh: &QueueHandle<Self>) {
        let ids: Vec<u32> = self.outputs.keys().copied().collect();
        for id in ids {
            self.ensure_gamma_for(qh, id);
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if interface == wl_output::WlOutput::interface().name {
                    let wl_output = registry.bind::<wl_output::WlOutput, _, _>(
                        name,
                        version.min(4),
                        qh,
                        OutputData { id: name },
                    );
                    state.outputs.insert(
                        name,
                        OutputState {
                            name: None,
                            wl_output,
                            gamma: None,
                            ramp_size: 0,
                            table: None,
                        },
                    );
                    state.ensure_gamma_for(qh, name);
                } else if interface
                    == zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1::interface().name
                {
                    let mgr = registry
                        .bind::<zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1, _, _>(
                            name,
                            1,
                            qh,
                            (),
                        );
                    state.gamma_mgr = Some(mgr);
                    state.gamma_mgr_name = Some(name);
                    state.ensure_gamma_all(qh);
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                if state.gamma_mgr_name == Some(name) {
                    state.gamma_mgr = None;
                    state.gamma_mgr_name = None;
                }
                state.outputs.remove(&name);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_output::WlOutput, OutputData> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        data: &OutputData,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let label = match event {
            wl_output::Event::Name { name } => name,
            wl_output::Event::Description { description } => description,
            _ => return,
        };
        if let Some(output) = state.outputs.get_mut(&data.id) {
            output.name = Some(label);
        }
    }
}

impl Dispatch<zwlr_gamma_control_v1::ZwlrGammaControlV1, GammaData> for WaylandState {
    fn event(
        state: &mut Self,
        _: &zwlr_gamma_control_v1::ZwlrGammaControlV1,
        event: zwlr_gamma_control_v1::Event,
        data: &GammaData,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(output) = state.outputs.get_mut(&data.id) else {
            return;
        };
        match event {
            zwlr_gamma_control_v1::Event::GammaSize { size } => {
                output.ramp_size = size;
                let table_bytes = size as usize * 3 * std::mem::size_of::<u16>();
                output.table = match create_anonymous_file(data.id, table_bytes) {
                    Ok(file) => match unsafe { MmapMut::map_mut(&file) } {
                        Ok(mmap) => Some((file, mmap)),
                        Err(err) => {
                            log::warn!("mmap failed for output {:?}: {err}", output.name);
                            None
                        }
                    },
                    Err(err) => {
                        log::warn!(
                            "failed to allocate gamma table for output {:?}: {err:#}",
                            output.name
                        );
                        None
                    }
                };
            }
            zwlr_gamma_control_v1::Event::Failed => {
                log::warn!("gamma control failed for output {:?}", output.name);
                output.gamma = None;
                output.table = None;
                output.ramp_size = 0;
            }
            _ => {}
        }
    }
}

delegate_noop!(WaylandState: ignore zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1);

fn create_anonymous_file(id: u32, size: usize) -> Result<File> {
    let mut path = PathBuf::from("/tmp");
    path.push(format!("redlux-{}-{id}", std::process::id()));
    let f = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .mode(0o600)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    f.set_len(size as u64)?;
    let _ = std::fs::remove_file(&path);
    Ok(f)
}

/// Applies one ramp to every output whose gamma table has the same depth.
pub struct WaylandVideo {
    conn: Connection,
    queue: EventQueue<WaylandState>,
    state: WaylandState,
    ramp_size: usize,
}

impl WaylandVideo {
    pub fn connect() -> Result<Self> {
        let conn = Connection::connect_to_env().context("connect wayland display")?;
        let mut queue = conn.new_event_queue();
        let qh = queue.handle();
        conn.display().get_registry(&qh, ());

        let mut state = WaylandState::new();
        queue
            .roundtrip(&mut state)
            .context("initial wayland roundtrip")?;
        if state.gamma_mgr.is_none() {
            bail!("compositor lacks wlr-gamma-control-unstable-v1");
        }
        state.ensure_gamma_all(&qh);
        queue
            .roundtrip(&mut state)
            .context("gamma setup roundtrip")?;

        let ramp_size = state
            .outputs
            .values()
            .find(|o| o.table.is_some())
            .map(|o| o.ramp_size as usize)
            .ok_or_else(|| anyhow!("no output offered a gamma table"))?;
        for output in state.outputs.values() {
            if output.table.is_some() && output.ramp_size as usize != ramp_size {
                log::warn!(
                    "skipping output {:?}: ramp size {} differs from {ramp_size}",
                    output.name,
                    output.ramp_size
                );
            }
        }

        Ok(Self {
            conn,
            queue,
            state,
            ramp_size,
        })
    }
}

impl VideoBackend for WaylandVideo {
    fn gamma_ramp_size(&self) -> usize {
        self.ramp_size
    }

    fn gamma_hint(&self) -> Option<&'static str> {
        Some(ABSOLUTE)
    }

    fn get_gamma(&mut self, ramp: &mut GammaRamp) -> Result<()> {
        log::debug!("wlr gamma control cannot read the active ramp, assuming identity");
        gamma::identity(ramp);
        Ok(())
    }

    fn set_gamma(&mut self, ramp: &GammaRamp) -> Result<()> {
        let mut applied = 0;
        for output in self.state.outputs.values_mut() {
            let Some(ref gamma_obj) = output.gamma else {
                continue;
            };
            if output.ramp_size as usize != ramp.depth() {
                continue;
            }
            let Some((file, mmap)) = output.table.as_mut() else {
                continue;
            };
            mmap.copy_from_slice(ramp.as_bytes());
            file.seek(SeekFrom::Start(0))?;
            log::trace!("applying gamma to output {:?}", output.name);
            gamma_obj.set_gamma(file.as_fd());
            applied += 1;
        }
        if applied == 0 {
            bail!("no output accepted the gamma ramp");
        }
        self.queue
            .roundtrip(&mut self.state)
            .context("gamma roundtrip")?;
        Ok(())
    }
}

impl Drop for WaylandVideo {
    fn drop(&mut self) {
        for output in self.state.outputs.values_mut() {
            if let Some(gamma) = output.gamma.take() {
                gamma.destroy();
            }
        }
        if let Some(mgr) = self.state.gamma_mgr.take() {
            mgr.destroy();
        }
        if let Err(err) = self.conn.flush() {
            log::debug!("flush on wayland teardown failed: {err}");
        }
    }
}
