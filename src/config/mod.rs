pub mod deploy_config;
