fn main() -> std::process::ExitCode {
    buildrun::main()
}
