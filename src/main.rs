fn main() {
    ambiance_lib::run()
}
