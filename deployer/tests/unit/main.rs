//! Integration tests for the deployment service


mod test_orchestrator;
mod test_ports;
mod test_server;
mod test_validate;
