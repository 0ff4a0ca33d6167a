fn main() {
    // Propagates ESP-IDF link/env settings when building for the target;
    // a no-op for host builds.
    embuild::espidf::sysenv::output();
}
