use anyhow::Result;
use kube::CustomResourceExt;
use scalingo_reconciler::PostgreSQL;

/// Print the CRD so it can be piped into `kubectl apply -f -`
pub fn print_crd() -> Result<()> {
    print!("{}", crd_yaml()?);
    Ok(())
}

fn crd_yaml() -> Result<String> {
    Ok(serde_yaml::to_string(&PostgreSQL::crd())?)
}
