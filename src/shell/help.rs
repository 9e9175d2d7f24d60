// ABOUTME: Help text shown by --help, the `help` name and `help()` in the console.

pub const HELP_TEXT: &str = concat!(
    "gvm-shell ",
    env!("CARGO_PKG_VERSION"),
    r#"

Command line tool to access services via the Greenbone Management
Protocol (GMP).

It can run a script against a GMP connection, start an interactive
console, or both. In the console the connection is bound to `gmp`
(also `client`), the parsed options to `args`, and this text to `help`.

Example:
    gmp.authenticate('admin', 'admin')

    tasks = gmp.get_tasks(filter='rows=10')

    print(tasks.status, tasks.status_text)

    version = gmp.get_version()

Any other method call on `gmp` sends the command of the same name with
keyword arguments as attributes. Use gmp.send_command('<xml/>') for
commands that need a body.

To get out of the console enter:
    Ctrl + D on Linux  or
    Ctrl + Z on Windows

Further information about the GMP protocol can be found at:
https://docs.greenbone.net/API/GMP/gmp.html
"#
);
