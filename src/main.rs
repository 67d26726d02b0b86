fn main() -> anyhow::Result<()> {
    focus_checkin_lib::run()
}
