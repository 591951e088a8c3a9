use portage_metadata_keys::{
    PackageDatabase, PlainFormatter, QualifiedPackageName, RawMetadata, Repository,
    RepositoryKind, StaticEnvironment, UseRequirement,
};

const SOURCE: &str = "\
DEPEND=>=sys-devel/clang-10.0.0_rc1:* dev-python/setuptools
DESCRIPTION=Python bindings for sys-devel/clang
EAPI=7
HOMEPAGE=https://llvm.org/
IUSE=+test python_targets_python3_6 python_targets_python3_7
KEYWORDS=~amd64 ~x86
LICENSE=Apache-2.0-with-LLVM-exceptions UoI-NCSA
RDEPEND=>=sys-devel/clang-10.0.0_rc1:* || ( dev-lang/python:3.6 dev-lang/python:3.7 )
RESTRICT=!test? ( test )
SLOT=0
SRC_URI=https://github.com/llvm/llvm-project/archive/llvmorg-10.0.0-rc1.tar.gz -> llvm-10.0.0-rc1.tar.gz
INHERITED=llvm.org multibuild
";

const INSTALLED: &str = "\
DESCRIPTION=Python bindings for sys-devel/clang
EAPI=7
IUSE=test python_targets_python3_6
USE=python_targets_python3_6
SLOT=0
REPOSITORY=gentoo
INSTALLED_TIME=1583020800
INHERITED=llvm.org multibuild
";

/// Read `KEY=VALUE` lines into a raw metadata map.
fn raw(input: &str) -> RawMetadata {
    input
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let name: QualifiedPackageName = "dev-python/clang-python".parse()?;

    let mut gentoo = Repository::new("gentoo", RepositoryKind::Source);
    let available = gentoo.add_version(name, "10.0.0_rc1", raw(SOURCE))?;
    let mut installed = Repository::new("installed", RepositoryKind::Installed);
    let merged = installed.add_version(available.name().clone(), "10.0.0_rc1", raw(INSTALLED))?;

    let mut db = PackageDatabase::new();
    db.add_repository(gentoo)?;
    db.add_repository(installed)?;

    for repository in db.repositories() {
        for name in repository.package_names() {
            for id in repository.package_ids(name) {
                println!("=== {id} ===");
                for key in id.metadata().keys() {
                    println!(
                        "{:<20} {}",
                        key.human_name(),
                        key.pretty_print_flat(&PlainFormatter)?
                    );
                }
                println!();
            }
        }
    }

    let rdepend = available.find_metadata("RDEPEND").ok_or("no RDEPEND")?;
    println!("=== {} (structured) ===", rdepend.human_name());
    println!("{}", rdepend.pretty_print(&PlainFormatter)?);
    println!();

    let env = StaticEnvironment::new();
    let iuse = available.find_metadata("IUSE").ok_or("no IUSE")?;
    println!(
        "IUSE compared with installed: {}",
        iuse.pretty_print_flat_with_comparison(&env, &available, &merged, &PlainFormatter)?
    );

    let src_uri = available.find_metadata("SRC_URI").ok_or("no SRC_URI")?;
    let tree = src_uri.as_fetchable_uri_tree()?;
    let initial = src_uri.initial_label()?;
    for (uri, label) in tree.fetchables(&initial) {
        println!("fetch {} as {} ({label})", uri.url, uri.filename());
    }

    for text in ["test", "-python_targets_python3_6", "python_targets_python3_6="] {
        let requirement = UseRequirement::parse(text, &merged)?;
        println!(
            "[{requirement}] satisfied by {}: {}",
            available,
            requirement.is_satisfied_by(&env, &available)
        );
    }

    Ok(())
}
