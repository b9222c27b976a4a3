fn main() -> anyhow::Result<()> {
    notes_widget::cli::run()
}
