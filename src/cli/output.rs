//! Result rendering for the `snmp-*` tools.

use std::io::{self, Write};
use std::time::Duration;

use super::args::OutputFormat;
use crate::error::Error;
use crate::format::hex;
use crate::message::Message;
use crate::value::Value;
use crate::varbind::VarBind;

/// How the tools print bindings.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    pub format: OutputFormat,
    pub force_hex: bool,
}

impl OutputContext {
    fn value_text(&self, value: &Value) -> String {
        match value {
            Value::OctetString(bytes) if self.force_hex => format!("0x{}", hex::encode(bytes)),
            other => other.to_string(),
        }
    }

    pub fn write_varbind(&self, out: &mut impl Write, vb: &VarBind) -> io::Result<()> {
        let value = self.value_text(&vb.value);
        match self.format {
            OutputFormat::Human => writeln!(out, "{} = {}: {}", vb.oid, vb.value.type_name(), value),
            OutputFormat::Raw => writeln!(out, "{}\t{}\t{}", vb.oid, vb.value.type_name(), value),
        }
    }

    pub fn write_varbinds(&self, out: &mut impl Write, varbinds: &[VarBind]) -> io::Result<()> {
        varbinds.iter().try_for_each(|vb| self.write_varbind(out, vb))
    }

    /// Header line then bindings.
    pub fn write_message(&self, out: &mut impl Write, msg: &Message) -> io::Result<()> {
        let pdu = &msg.pdu;
        writeln!(
            out,
            "{} {} community={:?} request_id={} error_status={} error_index={}",
            msg.version,
            pdu.pdu_type,
            msg.community_str(),
            pdu.request_id,
            pdu.error_status_enum(),
            pdu.error_index
        )?;
        self.write_varbinds(out, &pdu.varbinds)
    }
}

pub fn write_timing(elapsed: Duration) {
    eprintln!("elapsed: {:.1}ms", elapsed.as_secs_f64() * 1000.0);
}

/// Print an error and its source chain to stderr.
pub fn write_error(err: &Error) {
    eprintln!("Error: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn render(ctx: OutputContext, vb: &VarBind) -> String {
        let mut out = Vec::new();
        ctx.write_varbind(&mut out, vb).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn human_and_raw() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("edge"));
        let human = OutputContext {
            format: OutputFormat::Human,
            force_hex: false,
        };
        assert_eq!(render(human, &vb), "1.3.6.1.2.1.1.5.0 = OctetString: edge\n");

        let raw = OutputContext {
            format: OutputFormat::Raw,
            force_hex: true,
        };
        assert_eq!(render(raw, &vb), "1.3.6.1.2.1.1.5.0\tOctetString\t0x65646765\n");
    }
}
