use indicatif::ProgressStyle;

/// Byte-based progress style for a memory dump, prefixed with the target.
pub trait DumpProgress {
    fn dump_bar(target: &str) -> Self;
}

impl DumpProgress for ProgressStyle {
    fn dump_bar(target: &str) -> Self {
        let fmt = format!(
            "{} {{wide_bar:.cyan/blue}} {{bytes:>10}}/{{total_bytes:<10}} {{bytes_per_sec}} ({{eta}} remaining)",
            target
        );
        ProgressStyle::default_bar()
            .template(&fmt)
            .unwrap_or(ProgressStyle::default_bar())
    }
}
