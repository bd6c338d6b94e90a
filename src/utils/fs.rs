//! IO helper: safe file read/write for JSON

use std::{fs::File, io::BufReader, io::BufWriter, io::Write, path::Path};

use serde::Serialize;
use serde_json::Value;

use crate::model::data_core::HandoffError;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, HandoffError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将任意可序列化数据保存到文件（格式化输出）
pub fn write_json_file<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<(), HandoffError> {
    let f = File::create(p)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush()?;
    Ok(())
}
