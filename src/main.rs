fn main() -> anyhow::Result<()> {
    speedgate_lib::run()
}
