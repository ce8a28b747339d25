mod generate_test;
mod history_test;
mod router_test;
mod status_test;
