fn main() {
    let command_line_interface = jtd_typegen::cli::CommandLineInterface::load();
    command_line_interface.run();
}
