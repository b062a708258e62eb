use indicatif::ProgressStyle;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({per_sec}, {eta}) {msg}",
    )
    .expect("invalid progress bar template")
    .progress_chars("##-")
}
