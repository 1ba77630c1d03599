//! 抓包与事件 trace
//!
//! `TraceHub` 持有所有写出器，并记录哪些设备开启了 pcap / 文本 trace。
//! 仿真运行期间的写错误无法在事件里向上传播：只记录第一个错误，
//! 在 `finish()` 时返回。

mod ascii;
mod pcap;

pub use ascii::{AsciiTrace, TraceOp, TracePoint};
pub use pcap::{DEFAULT_SNAPLEN, LINKTYPE_RAW, PCAP_MAGIC, PcapWriter, encode_ipv4_tcp};

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::net::{DeviceId, Packet};
use crate::sim::SimTime;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("cannot create trace file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("trace write failed: {0}")]
    Io(#[from] io::Error),
}

/// 文本 trace 流句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsciiStreamId(usize);

struct PcapTap {
    promiscuous: bool,
    writer: PcapWriter<Box<dyn Write>>,
}

#[derive(Default)]
pub struct TraceHub {
    pcaps: Vec<PcapTap>,
    dev_pcap: HashMap<DeviceId, usize>,
    ascii: Vec<AsciiTrace<Box<dyn Write>>>,
    dev_ascii: HashMap<DeviceId, Vec<AsciiStreamId>>,
    files: Vec<PathBuf>,
    error: Option<io::Error>,
}

impl TraceHub {
    /// 创建带缓冲的输出文件，并记录其路径
    pub fn create_file(&mut self, path: &Path) -> Result<Box<dyn Write>, TraceError> {
        let file = File::create(path).map_err(|source| TraceError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        self.files.push(path.to_path_buf());
        debug!(path = %path.display(), "创建 trace 文件");
        Ok(Box::new(BufWriter::new(file)))
    }

    /// 本次运行创建的所有 trace 文件
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// 为设备挂一个 pcap 写出器；同一设备重复开启时替换旧的。
    pub fn add_pcap(
        &mut self,
        dev: DeviceId,
        out: Box<dyn Write>,
        promiscuous: bool,
    ) -> Result<(), TraceError> {
        let writer = PcapWriter::new(out, DEFAULT_SNAPLEN)?;
        let tap = PcapTap {
            promiscuous,
            writer,
        };
        match self.dev_pcap.get(&dev) {
            Some(&idx) => self.pcaps[idx] = tap,
            None => {
                self.dev_pcap.insert(dev, self.pcaps.len());
                self.pcaps.push(tap);
            }
        }
        Ok(())
    }

    pub fn has_pcap(&self, dev: DeviceId) -> bool {
        self.dev_pcap.contains_key(&dev)
    }

    pub fn is_promiscuous(&self, dev: DeviceId) -> bool {
        self.dev_pcap
            .get(&dev)
            .is_some_and(|&idx| self.pcaps[idx].promiscuous)
    }

    /// 新建一个文本 trace 流，可被多个设备共享
    pub fn add_ascii_stream(&mut self, out: Box<dyn Write>) -> AsciiStreamId {
        let id = AsciiStreamId(self.ascii.len());
        self.ascii.push(AsciiTrace::new(out));
        id
    }

    pub fn attach_ascii(&mut self, dev: DeviceId, stream: AsciiStreamId) {
        let streams = self.dev_ascii.entry(dev).or_default();
        if !streams.contains(&stream) {
            streams.push(stream);
        }
    }

    pub fn has_ascii(&self, dev: DeviceId) -> bool {
        self.dev_ascii.contains_key(&dev)
    }

    pub(crate) fn pcap(&mut self, dev: DeviceId, at: SimTime, pkt: &Packet) {
        let Some(&idx) = self.dev_pcap.get(&dev) else {
            return;
        };
        let res = self.pcaps[idx].writer.write_packet(at, pkt);
        self.remember(res);
    }

    pub(crate) fn ascii(&mut self, dev: DeviceId, op: TraceOp, at: SimTime, point: &TracePoint, pkt: &Packet) {
        let Some(streams) = self.dev_ascii.get(&dev) else {
            return;
        };
        let mut first_err = None;
        for s in streams {
            if let Err(e) = self.ascii[s.0].write_event(op, at, point, pkt) {
                first_err.get_or_insert(e);
            }
        }
        if let Some(e) = first_err {
            self.remember(Err(e));
        }
    }

    fn remember(&mut self, res: io::Result<()>) {
        if let Err(e) = res {
            if self.error.is_none() {
                warn!(error = %e, "trace 写入失败，后续错误将被忽略");
                self.error = Some(e);
            }
        }
    }

    /// 刷新全部写出器；返回运行期间遇到的第一个错误（如有）。
    pub fn finish(&mut self) -> Result<(), TraceError> {
        for tap in &mut self.pcaps {
            let res = tap.writer.flush();
            if let Err(e) = res {
                self.error.get_or_insert(e);
            }
        }
        for a in &mut self.ascii {
            if let Err(e) = a.flush() {
                self.error.get_or_insert(e);
            }
        }
        match self.error.take() {
            Some(e) => Err(TraceError::Io(e)),
            None => Ok(()),
        }
    }

    /// (pcap 记录数, 文本 trace 行数)
    pub fn counts(&self) -> (u64, u64) {
        let pcap = self.pcaps.iter().map(|t| t.writer.records()).sum();
        let lines = self.ascii.iter().map(|a| a.lines()).sum();
        (pcap, lines)
    }
}
