fn main() {
  std::process::exit(dcbpatch::app::run());
}
